pub mod iolite;
