use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, StockExhaustedEvent, TransactionPaidEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub transaction_paid_producer: Vec<EventProducer<TransactionPaidEvent>>,
    pub stock_exhausted_producer: Vec<EventProducer<StockExhaustedEvent>>,
}

pub struct EventHandlers {
    pub on_transaction_paid: Option<EventHandler<TransactionPaidEvent>>,
    pub on_stock_exhausted: Option<EventHandler<StockExhaustedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_transaction_paid = hooks.on_transaction_paid.map(|f| EventHandler::new(buffer_size, f));
        let on_stock_exhausted = hooks.on_stock_exhausted.map(|f| EventHandler::new(buffer_size, f));
        Self { on_transaction_paid, on_stock_exhausted }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_transaction_paid {
            result.transaction_paid_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_stock_exhausted {
            result.stock_exhausted_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_transaction_paid {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_stock_exhausted {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_transaction_paid: Option<Handler<TransactionPaidEvent>>,
    pub on_stock_exhausted: Option<Handler<StockExhaustedEvent>>,
}

impl EventHooks {
    pub fn on_transaction_paid<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(TransactionPaidEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_transaction_paid = Some(Arc::new(f));
        self
    }

    pub fn on_stock_exhausted<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(StockExhaustedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_stock_exhausted = Some(Arc::new(f));
        self
    }
}
