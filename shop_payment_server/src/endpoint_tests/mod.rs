mod helpers;
mod mocks;

mod payment_status;
mod payments;
mod transactions;
