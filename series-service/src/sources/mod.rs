pub mod enelogic;

pub use enelogic::EnelogicSource;
