pub mod csv_export;
pub mod latex_export;
pub mod table;
pub mod tables;
