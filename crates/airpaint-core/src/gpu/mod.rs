pub mod device;
pub mod layouts;
pub mod pipelines;
pub mod readback;
pub mod target;
pub mod textures;
pub mod uniforms;

pub use device::*;
pub use pipelines::*;
pub use readback::*;
pub use target::*;
pub use textures::*;
pub use uniforms::*;
