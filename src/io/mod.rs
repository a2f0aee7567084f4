/// CSV export of load profiles.
pub mod export;
