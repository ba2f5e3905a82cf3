//! Order submission.
//!
//! Sends exactly one market order and classifies the exchange's immediate
//! reply. Nothing here retries: a transport failure is returned as-is.

use tracing::{error, info, warn};

use dca_domain::{Order, OrderRequest, OrderStatus};

use crate::error::ExecResult;
use crate::ports::{ExchangePort, OrderReply};

/// Classified outcome of placing an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Order accepted; poll it by identifier
    Accepted(Order),
    /// Order created with status `rejected`
    Rejected(Order),
    /// Exchange refused the request outright (error message, no order)
    Failed {
        /// Exchange message, verbatim
        message: String,
    },
}

/// Place `request` on the exchange and classify the reply.
///
/// # Errors
///
/// Transport failures from the exchange port are propagated unchanged.
pub async fn submit_order<E>(exchange: &E, request: &OrderRequest) -> ExecResult<Submission>
where
    E: ExchangePort + ?Sized,
{
    info!(
        product_id = %request.product_id,
        side = %request.side,
        field = request.quantity.field_name(),
        value = %request.quantity.as_decimal(),
        "Placing market order"
    );

    let reply = exchange.place_market_order(request).await?;

    let submission = match reply {
        OrderReply::Failed { message } => {
            error!(product_id = %request.product_id, %message, "Exchange refused order");
            Submission::Failed { message }
        },
        OrderReply::Placed(order) if order.status == OrderStatus::Rejected => {
            warn!(
                order_id = %order.id,
                reason = order.reject_reason.as_deref().unwrap_or("unspecified"),
                "Order rejected"
            );
            Submission::Rejected(order)
        },
        OrderReply::Placed(order) => {
            info!(order_id = %order.id, status = %order.status, "Order placed");
            Submission::Accepted(order)
        },
    };

    Ok(submission)
}

// =============================================================================
// Tests
// =============================================================================
