pub mod attendance_record;
pub mod class;
pub mod course;
pub mod notification;
pub mod parent_child;
pub mod school;
pub mod user;

pub use attendance_record::Entity as AttendanceRecord;
pub use class::Entity as Class;
pub use course::Entity as Course;
pub use notification::Entity as Notification;
pub use parent_child::Entity as ParentChild;
pub use school::Entity as School;
pub use user::Entity as User;
