pub mod audit;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod coupon;
pub mod db;
pub mod dto;
pub mod entity;
pub mod error;
pub mod local_store;
pub mod middleware;
pub mod models;
pub mod pricing;
pub mod response;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;
pub mod storage;
