//! External inputs: the sensor line protocol, the serial source, the hourly
//! forecast and the one-time geolocation lookup.

pub mod fixtures;
pub mod forecast;
pub mod geolocation;
pub mod line;
pub mod serial;
