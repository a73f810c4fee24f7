pub mod city;
pub mod date_span;
pub mod flat_record;
pub mod weather_table;
