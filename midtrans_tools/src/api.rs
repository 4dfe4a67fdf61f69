use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
    StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{config::MidtransConfig, MidtransApiError, MidtransNotification};

#[derive(Clone)]
pub struct MidtransApi {
    config: MidtransConfig,
    client: Arc<Client>,
}

impl MidtransApi {
    pub fn new(config: MidtransConfig) -> Result<Self, MidtransApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| MidtransApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &MidtransConfig {
        &self.config
    }

    /// Sends an authenticated request to the Core API. A `404` response yields `Ok(None)`.
    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<Option<T>, MidtransApiError> {
        let url = self.url(path);
        trace!("🔍️ Sending REST query: {url}");
        let mut req =
            self.client.request(method, url).basic_auth(self.config.server_key.reveal(), Some(String::default()));
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| MidtransApiError::RestRequestError(e.to_string()))?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            trace!("🔍️ REST query returned 404");
            return Ok(None);
        }
        if status.is_success() {
            trace!("🔍️ REST query successful. {status}");
            let result = response.json::<T>().await.map_err(|e| MidtransApiError::JsonError(e.to_string()))?;
            Ok(Some(result))
        } else {
            let message = response.text().await.map_err(|e| MidtransApiError::RestResponseError(e.to_string()))?;
            Err(MidtransApiError::QueryError { status: status.as_u16(), message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url)
    }

    /// Fetches the current status of an order from the Core API. Returns `None` if Midtrans does not know the order.
    pub async fn transaction_status(&self, order_id: &str) -> Result<Option<MidtransNotification>, MidtransApiError> {
        let path = format!("/v2/{order_id}/status");
        debug!("🔍️ Fetching Midtrans status for order {order_id}");
        let result = self.rest_query::<MidtransNotification, ()>(Method::GET, &path, None).await?;
        match result {
            Some(n) if n.is_not_found() => {
                info!("🔍️ Midtrans does not know order {order_id}");
                Ok(None)
            },
            Some(n) if n.is_error() => {
                warn!("🔍️ Midtrans rejected the status query for order {order_id}. {:?}", n.status_message);
                Err(MidtransApiError::Rejected {
                    status_code: n.status_code.unwrap_or_default(),
                    message: n.status_message.unwrap_or_default(),
                })
            },
            Some(n) => {
                info!("🔍️ Midtrans reports order {order_id} as {:?}", n.transaction_status);
                Ok(Some(n))
            },
            None => Ok(None),
        }
    }
}
