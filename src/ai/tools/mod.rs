mod availability;
mod slots;

pub use availability::CheckAvailabilityTool;
pub use slots::FindFreeTimeTool;
