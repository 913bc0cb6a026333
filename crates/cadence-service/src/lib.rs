pub mod attendance;
pub mod class;
pub mod error;
pub mod schedule;

#[cfg(test)]
mod test_fixtures;
