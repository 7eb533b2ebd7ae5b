pub mod compare;
pub mod eventbrite;
pub mod oauth;
pub mod registrations;
pub mod report;
pub mod widgets;
