pub mod bank_dto;
