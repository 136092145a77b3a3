pub mod digitizer;
