// Business domains
pub mod classification;
pub mod monitoring;
pub mod notification;
