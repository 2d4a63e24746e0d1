pub mod booking;
pub mod direction;
pub mod error;
pub mod mobility_assistance;
pub mod program;
pub mod schedule;
pub mod shuttle;
pub mod task;
pub mod trip;
pub mod vehicle;

pub use booking::Booking;
pub use direction::{direction_cache_key, Direction};
pub use error::{SchedulerError, SchedulerResult};
pub use mobility_assistance::MobilityAssistance;
pub use program::{Program, ProgramInput};
pub use schedule::{Optimization, ScheduleRequest, ScheduleResponse, ScheduleResult, ScheduleResultData};
pub use shuttle::Shuttle;
pub use task::{CreateTaskResponse, Task, TaskStatus};
pub use trip::Trip;
pub use vehicle::Vehicle;
