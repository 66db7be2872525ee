pub mod generate;
pub mod live;

pub use generate::GenerateController;
pub use live::LiveController;
