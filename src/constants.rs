//! Application-wide constants and default values
//!
//! Centralized location for hard-coded layout values

/// Port header strip constants
pub mod iolet {
    /// Width of a single inlet/outlet box
    pub const WIDTH: f32 = 10.0;

    /// Height of the header strip holding the ports
    pub const HEIGHT: f32 = 3.0;

    /// Horizontal gap between neighbouring ports
    pub const SPACING: f32 = 13.0;
}

/// Default text metrics for the built-in monospace measurer
pub mod text {
    pub const CHAR_WIDTH: f32 = 7.0;

    pub const LINE_HEIGHT: f32 = 14.0;
}

/// Hit testing and stacking constants
pub mod interaction {
    /// Maximum pointer distance from a connection line that still hits it
    pub const CONNECTION_HIT_TOLERANCE: f32 = 4.0;

    /// Extra slop around port boxes when hit testing
    pub const PORT_HIT_SLOP: f32 = 2.0;

    /// Half the connection pen width, used for connection bounds
    pub const CONNECTION_HALF_WIDTH: f32 = 0.5;

    /// Stacking order of the provisional drag line, above every scene item
    pub const DRAG_LINE_Z: f32 = 10_000.0;
}

/// Name of the directory under the platform config dir
pub const CONFIG_DIR_NAME: &str = "patchcanvas";

/// Editor configuration file name
pub const CONFIG_FILE_NAME: &str = "editor.json";
