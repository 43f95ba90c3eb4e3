pub mod beach_filter;
pub mod raid_logs;
pub mod view_state;
