//! Decoder and encoder configuration.

/// Options controlling [`Decoder`](crate::decoder::Decoder).
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeOptions {
    /// Compare accessor `min`/`max` against the data and warn on mismatch.
    pub check_min_max: bool,
    /// Resolve image URIs into `Image::data`.
    pub load_images: bool,
    /// Absolute tolerance used by the `min`/`max` comparison.
    pub min_max_tolerance: f64,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            check_min_max: true,
            load_images: true,
            min_max_tolerance: 1e-5,
        }
    }
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_check_min_max(mut self, check: bool) -> Self {
        self.check_min_max = check;
        self
    }

    pub fn with_load_images(mut self, load: bool) -> Self {
        self.load_images = load;
        self
    }

    pub fn with_min_max_tolerance(mut self, tolerance: f64) -> Self {
        self.min_max_tolerance = tolerance;
        self
    }
}

/// Options controlling [`Encoder`](crate::encoder::Encoder).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Write every buffer as a base64 `data:` URI.
    pub embed_buffers: bool,
    /// Write URI images as base64 `data:` URIs.
    pub embed_images: bool,
    /// Indent the JSON output.
    pub pretty: bool,
    /// Produce a GLB instead of JSON text.
    pub binary_container: bool,
    /// Validate references before writing.
    pub strict: bool,
    /// File name stem for buffers that need a new external file.
    pub buffer_uri_stem: String,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            embed_buffers: false,
            embed_images: false,
            pretty: false,
            binary_container: false,
            strict: false,
            buffer_uri_stem: "buffer".to_string(),
        }
    }
}

impl EncodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults for a self-contained GLB.
    pub fn binary() -> Self {
        Self {
            binary_container: true,
            ..Self::default()
        }
    }

    pub fn with_embed_buffers(mut self, embed: bool) -> Self {
        self.embed_buffers = embed;
        self
    }

    pub fn with_embed_images(mut self, embed: bool) -> Self {
        self.embed_images = embed;
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn with_binary_container(mut self, binary: bool) -> Self {
        self.binary_container = binary;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_buffer_uri_stem(mut self, stem: impl Into<String>) -> Self {
        self.buffer_uri_stem = stem.into();
        self
    }
}
