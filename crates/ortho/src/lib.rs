#![doc = env!("CARGO_PKG_DESCRIPTION")]

#[doc(inline)]
pub use ortho_camera as camera;

#[doc(inline)]
pub use ortho_geometry as geometry;

#[doc(inline)]
pub use ortho_image as image;

#[doc(inline)]
pub use ortho_io as io;

#[doc(inline)]
pub use ortho_rectify as rectify;
