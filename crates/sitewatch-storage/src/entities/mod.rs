pub mod alert;
pub mod alert_response;
pub mod alert_rule;
