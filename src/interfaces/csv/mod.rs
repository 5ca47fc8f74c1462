pub mod receivable_reader;
