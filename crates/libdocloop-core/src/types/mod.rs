pub mod ids;
pub mod version;
pub mod change;
pub mod suggestion;
pub mod report;
pub mod session;
