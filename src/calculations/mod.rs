pub mod lineup_order;
pub mod timetable_pass;
