pub mod client;
pub mod fonts;
pub mod images;
pub mod raster;
pub mod renderer;
pub mod svg;
