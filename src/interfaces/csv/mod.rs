pub mod facility_reader;
