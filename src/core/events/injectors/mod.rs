pub mod adm;
