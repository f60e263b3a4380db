pub mod dose;
pub mod medication;
pub mod mood;
pub mod sleep;
pub use dose::*;
pub use medication::*;
pub use mood::*;
pub use sleep::*;
