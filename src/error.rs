use failure::Fail;

/// Hardware configuration that must never reach the driver.
#[derive(Debug, Fail, PartialEq)]
pub enum ConfigError {
    #[fail(display = "configuration error: item type {} not supported", _0)]
    UnsupportedItemType(String),

    #[fail(display = "configuration error: both rx1 and rx2 are enabled")]
    BothChannelsEnabled,
}

/// Rejected graph edits.
#[derive(Debug, Fail, PartialEq)]
pub enum GraphError {
    #[fail(display = "block {} has no output port {}", block, port)]
    NoSuchOutput { block: String, port: usize },

    #[fail(display = "block {} has no input port {}", block, port)]
    NoSuchInput { block: String, port: usize },

    #[fail(display = "input {} of block {} is already connected", port, block)]
    InputInUse { block: String, port: usize },

    #[fail(display = "edge {} already exists", _0)]
    DuplicateEdge(String),

    #[fail(display = "edge {} is not connected", _0)]
    EdgeNotFound(String),
}
