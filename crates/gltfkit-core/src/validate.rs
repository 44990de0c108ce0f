//! Cross-reference validation of a [`Model`].
//!
//! Checks that every index stored in the model points inside its target
//! table and that the node hierarchy is a forest: no node is reachable from
//! itself and no node has two parents.

use log::trace;

use crate::error::ReferenceError;
use crate::model::{AttributeMap, ImageSource, Model};

fn check(field: impl FnOnce() -> String, index: usize, len: usize) -> Result<(), ReferenceError> {
    if index < len {
        Ok(())
    } else {
        Err(ReferenceError::DanglingReference {
            field: field(),
            index,
            len,
        })
    }
}

fn check_opt(
    field: impl FnOnce() -> String,
    index: Option<usize>,
    len: usize,
) -> Result<(), ReferenceError> {
    match index {
        Some(index) => check(field, index, len),
        None => Ok(()),
    }
}

fn check_attributes(prefix: &str, map: &AttributeMap, len: usize) -> Result<(), ReferenceError> {
    for (name, &index) in map {
        check(|| format!("{}.{}", prefix, name), index, len)?;
    }
    Ok(())
}

/// Validates every cross-reference of `model`.
///
/// Field paths in errors use singular table names, e.g. `node[0].mesh`.
pub fn validate_references(model: &Model) -> Result<(), ReferenceError> {
    let nodes = model.nodes.len();
    let accessors = model.accessors.len();

    check_opt(|| "scene".to_string(), model.scene, model.scenes.len())?;

    for (i, scene) in model.scenes.iter().enumerate() {
        for (j, &node) in scene.nodes.iter().enumerate() {
            check(|| format!("scene[{}].nodes[{}]", i, j), node, nodes)?;
        }
    }

    for (i, node) in model.nodes.iter().enumerate() {
        check_opt(|| format!("node[{}].mesh", i), node.mesh, model.meshes.len())?;
        check_opt(|| format!("node[{}].skin", i), node.skin, model.skins.len())?;
        check_opt(|| format!("node[{}].camera", i), node.camera, model.cameras.len())?;
        for (j, &child) in node.children.iter().enumerate() {
            check(|| format!("node[{}].children[{}]", i, j), child, nodes)?;
        }
    }

    for (i, mesh) in model.meshes.iter().enumerate() {
        for (j, prim) in mesh.primitives.iter().enumerate() {
            let prefix = format!("mesh[{}].primitive[{}]", i, j);
            check_attributes(&format!("{}.attributes", prefix), &prim.attributes, accessors)?;
            check_opt(|| format!("{}.indices", prefix), prim.indices, accessors)?;
            check_opt(
                || format!("{}.material", prefix),
                prim.material,
                model.materials.len(),
            )?;
            for (k, target) in prim.targets.iter().enumerate() {
                check_attributes(&format!("{}.target[{}]", prefix, k), target, accessors)?;
            }
        }
    }

    for (i, accessor) in model.accessors.iter().enumerate() {
        let views = model.buffer_views.len();
        check_opt(|| format!("accessor[{}].bufferView", i), accessor.buffer_view, views)?;
        if let Some(sparse) = &accessor.sparse {
            check(
                || format!("accessor[{}].sparse.indices.bufferView", i),
                sparse.indices.buffer_view,
                views,
            )?;
            check(
                || format!("accessor[{}].sparse.values.bufferView", i),
                sparse.values.buffer_view,
                views,
            )?;
        }
    }

    for (i, view) in model.buffer_views.iter().enumerate() {
        check(|| format!("bufferView[{}].buffer", i), view.buffer, model.buffers.len())?;
    }

    for (i, material) in model.materials.iter().enumerate() {
        for (field, index) in material.texture_refs() {
            check(|| format!("material[{}].{}", i, field), index, model.textures.len())?;
        }
    }

    for (i, texture) in model.textures.iter().enumerate() {
        check_opt(
            || format!("texture[{}].sampler", i),
            texture.sampler,
            model.samplers.len(),
        )?;
        check_opt(|| format!("texture[{}].source", i), texture.source, model.images.len())?;
    }

    for (i, image) in model.images.iter().enumerate() {
        if let ImageSource::BufferView(view) = image.source {
            check(
                || format!("image[{}].bufferView", i),
                view,
                model.buffer_views.len(),
            )?;
        }
    }

    for (i, animation) in model.animations.iter().enumerate() {
        for (j, channel) in animation.channels.iter().enumerate() {
            check(
                || format!("animation[{}].channel[{}].sampler", i, j),
                channel.sampler,
                animation.samplers.len(),
            )?;
            check_opt(
                || format!("animation[{}].channel[{}].target.node", i, j),
                channel.target.node,
                nodes,
            )?;
        }
        for (j, sampler) in animation.samplers.iter().enumerate() {
            check(
                || format!("animation[{}].sampler[{}].input", i, j),
                sampler.input,
                accessors,
            )?;
            check(
                || format!("animation[{}].sampler[{}].output", i, j),
                sampler.output,
                accessors,
            )?;
        }
    }

    for (i, skin) in model.skins.iter().enumerate() {
        check_opt(
            || format!("skin[{}].inverseBindMatrices", i),
            skin.inverse_bind_matrices,
            accessors,
        )?;
        check_opt(|| format!("skin[{}].skeleton", i), skin.skeleton, nodes)?;
        for (j, &joint) in skin.joints.iter().enumerate() {
            check(|| format!("skin[{}].joints[{}]", i, j), joint, nodes)?;
        }
    }

    check_node_graph(model)?;
    trace!("validated references of {} nodes", nodes);
    Ok(())
}

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Rejects cycles through `children` and nodes with more than one parent.
///
/// Assumes child indices are already known to be in range.
pub fn check_node_graph(model: &Model) -> Result<(), ReferenceError> {
    let n = model.nodes.len();

    let mut marks = vec![Mark::Unvisited; n];
    for root in 0..n {
        if marks[root] != Mark::Unvisited {
            continue;
        }
        // Iterative DFS: (node, next child position)
        let mut stack = vec![(root, 0usize)];
        marks[root] = Mark::InProgress;
        while let Some(top) = stack.last_mut() {
            let (node, pos) = *top;
            match model.nodes[node].children.get(pos) {
                Some(&child) => {
                    top.1 += 1;
                    match marks.get(child) {
                        Some(Mark::InProgress) => {
                            return Err(ReferenceError::CyclicNodeGraph { node: child })
                        }
                        Some(Mark::Unvisited) => {
                            marks[child] = Mark::InProgress;
                            stack.push((child, 0));
                        }
                        _ => {}
                    }
                }
                None => {
                    marks[node] = Mark::Done;
                    stack.pop();
                }
            }
        }
    }

    let mut parent: Vec<Option<usize>> = vec![None; n];
    for (p, node) in model.nodes.iter().enumerate() {
        for &child in &node.children {
            match parent.get(child).copied().flatten() {
                Some(first) if first != p => {
                    return Err(ReferenceError::MultipleParents {
                        node: child,
                        first,
                        second: p,
                    })
                }
                _ => {
                    if let Some(slot) = parent.get_mut(child) {
                        *slot = Some(p);
                    }
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Mesh, Node, Primitive, Scene};

    fn node_with_children(children: Vec<usize>) -> Node {
        Node {
            children,
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_model() {
        let mut model = Model::new();
        model.nodes = vec![node_with_children(vec![1, 2]), Node::default(), Node::default()];
        model.scenes.push(Scene {
            nodes: vec![0],
            ..Default::default()
        });
        model.scene = Some(0);
        assert_eq!(validate_references(&model), Ok(()));
    }

    #[test]
    fn test_dangling_node_mesh() {
        let mut model = Model::new();
        model.meshes.push(Mesh::default());
        model.nodes.push(Node {
            mesh: Some(5),
            ..Default::default()
        });
        let err = validate_references(&model).unwrap_err();
        assert_eq!(err.field(), Some("node[0].mesh"));
        assert_eq!(
            err,
            ReferenceError::DanglingReference {
                field: "node[0].mesh".into(),
                index: 5,
                len: 1
            }
        );
    }

    #[test]
    fn test_dangling_attribute_path() {
        let mut model = Model::new();
        let mut prim = Primitive::default();
        prim.attributes.insert("NORMAL".into(), 3);
        model.meshes.push(Mesh {
            primitives: vec![Primitive::default(), prim],
            ..Default::default()
        });
        let err = validate_references(&model).unwrap_err();
        assert_eq!(err.field(), Some("mesh[0].primitive[1].attributes.NORMAL"));
    }

    #[test]
    fn test_cycle_detected() {
        let mut model = Model::new();
        model.nodes = vec![node_with_children(vec![1]), node_with_children(vec![0])];
        assert!(matches!(
            validate_references(&model),
            Err(ReferenceError::CyclicNodeGraph { .. })
        ));

        model.nodes = vec![node_with_children(vec![0])];
        assert_eq!(
            validate_references(&model),
            Err(ReferenceError::CyclicNodeGraph { node: 0 })
        );
    }

    #[test]
    fn test_multiple_parents() {
        let mut model = Model::new();
        model.nodes = vec![
            node_with_children(vec![2]),
            node_with_children(vec![2]),
            Node::default(),
        ];
        assert_eq!(
            validate_references(&model),
            Err(ReferenceError::MultipleParents {
                node: 2,
                first: 0,
                second: 1
            })
        );
    }
}
