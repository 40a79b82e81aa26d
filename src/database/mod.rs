pub mod pool;
pub mod unit_of_work;
