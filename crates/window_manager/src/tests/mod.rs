//! Manager-level tests driving the headless backend

mod end_to_end;
mod support;
mod threaded_groups;
