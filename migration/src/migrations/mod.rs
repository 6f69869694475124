pub mod m202510010001_create_schools;
pub mod m202510010002_create_classes;
pub mod m202510010003_create_users;
pub mod m202510010004_create_courses;
pub mod m202510010005_create_parent_children;
pub mod m202510010006_create_attendance_records;
pub mod m202510010007_create_notifications;
