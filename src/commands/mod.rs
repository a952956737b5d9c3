//! CLI commands for gradeflow

pub mod dispatch;
pub mod grade;
pub mod index;
pub mod init;
pub mod similar;
