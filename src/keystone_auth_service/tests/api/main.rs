mod confirm;
mod dispatch;
mod health;
mod helpers;
mod login;
mod metrics;
mod postgres;
mod refresh;
mod register;
mod verify;
