use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::application::order_service::OrderService;
use crate::auth::{AdminUser, CurrentUser};
use crate::domain::order::{CreateOrder, LogicalOrder, OrderLine, OrderedService, PageRequest};
use crate::errors::AppError;
use crate::notifications::{notify_in_background, OrderNotifier};

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub customer_id: i32,
    /// One order line is created per entry, in this order.
    pub service_ids: Vec<i32>,
    pub order_status: String,
}

impl From<CreateOrderRequest> for CreateOrder {
    fn from(req: CreateOrderRequest) -> Self {
        Self {
            customer_id: req.customer_id,
            service_ids: req.service_ids,
            status: req.order_status,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub order_id: i64,
    pub order_status: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderDeliveryRequest {
    pub order_id: i64,
    pub order_delivered: bool,
    pub order_delivery_time: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ServiceResponse {
    pub service_id: i32,
    pub service_name: String,
    /// Decimal price as a string, e.g. "9.99"
    pub service_price: String,
    pub service_image: String,
}

impl From<OrderedService> for ServiceResponse {
    fn from(s: OrderedService) -> Self {
        Self {
            service_id: s.service_id,
            service_name: s.name,
            service_price: s.price.to_string(),
            service_image: s.image_url,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub order_id: i64,
    pub user_id: i32,
    pub customer_name: String,
    pub order_status: String,
    pub order_started: DateTime<Utc>,
    pub order_delivered: bool,
    pub order_delivery_time: Option<DateTime<Utc>>,
    pub services: Vec<ServiceResponse>,
}

impl From<LogicalOrder> for OrderResponse {
    fn from(o: LogicalOrder) -> Self {
        Self {
            order_id: o.order_id,
            user_id: o.customer_id,
            customer_name: o.customer_name,
            order_status: o.status,
            order_started: o.started_at,
            order_delivered: o.delivered,
            order_delivery_time: o.delivered_at,
            services: o.services.into_iter().map(ServiceResponse::from).collect(),
        }
    }
}

/// A single stored line, as written.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderLineResponse {
    pub id: i64,
    pub order_id: i64,
    pub user_id: i32,
    pub service_id: i32,
    pub order_status: String,
    pub order_started: DateTime<Utc>,
    pub order_delivered: bool,
    pub order_delivery_time: Option<DateTime<Utc>>,
}

impl From<OrderLine> for OrderLineResponse {
    fn from(l: OrderLine) -> Self {
        Self {
            id: l.line_id,
            order_id: l.order_id,
            user_id: l.customer_id,
            service_id: l.service_id,
            order_status: l.status,
            order_started: l.started_at,
            order_delivered: l.delivered,
            order_delivery_time: l.delivered_at,
        }
    }
}

fn order_list(orders: Vec<LogicalOrder>) -> Vec<OrderResponse> {
    orders.into_iter().map(OrderResponse::from).collect()
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListOrdersParams {
    /// Page number (1-based).
    pub page_id: i64,
    /// Orders per page, between 5 and 10.
    pub page_size: i64,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Creates one order line per requested service under a single new order id,
/// inside one transaction. A "new order" notification is published in the
/// background once the order is committed.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Order created", body = OrderResponse),
        (status = 400, description = "Empty or unknown service ids"),
        (status = 401, description = "Caller is not the customer"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    service: web::Data<OrderService>,
    notifier: web::Data<dyn OrderNotifier>,
    user: CurrentUser,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let request = CreateOrder::from(body.into_inner());

    let order = web::block(move || service.create_order(&user.email, request)).await??;

    notify_in_background(notifier.into_inner(), order.order_id);

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// PUT /orders/status
///
/// Sets the status of every line of the order. Any label is accepted.
#[utoipa::path(
    put,
    path = "/orders/status",
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = OrderLineResponse),
        (status = 401, description = "Admin role required"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn update_order_status(
    service: web::Data<OrderService>,
    _admin: AdminUser,
    body: web::Json<UpdateOrderStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();

    let line =
        web::block(move || service.update_status(body.order_id, &body.order_status)).await??;

    Ok(HttpResponse::Ok().json(OrderLineResponse::from(line)))
}

/// PUT /orders/delivery
#[utoipa::path(
    put,
    path = "/orders/delivery",
    request_body = UpdateOrderDeliveryRequest,
    responses(
        (status = 200, description = "Delivery updated", body = OrderLineResponse),
        (status = 401, description = "Admin role required"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn update_order_delivery(
    service: web::Data<OrderService>,
    _admin: AdminUser,
    body: web::Json<UpdateOrderDeliveryRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();

    let line = web::block(move || {
        service.update_delivery(body.order_id, body.order_delivered, body.order_delivery_time)
    })
    .await??;

    Ok(HttpResponse::Ok().json(OrderLineResponse::from(line)))
}

/// GET /orders/{order_id}
///
/// Returns the aggregated order. Customers may only read their own orders.
#[utoipa::path(
    get,
    path = "/orders/{order_id}",
    params(
        ("order_id" = i64, Path, description = "Order id"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 401, description = "Not the owner"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    service: web::Data<OrderService>,
    user: CurrentUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let order = web::block(move || {
        if user.is_admin() {
            service.get_order(order_id)
        } else {
            service.get_customer_order(&user.email, order_id)
        }
    })
    .await??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// GET /orders/{order_id}/lines
///
/// Returns the stored lines of one order without aggregation.
#[utoipa::path(
    get,
    path = "/orders/{order_id}/lines",
    params(
        ("order_id" = i64, Path, description = "Order id"),
    ),
    responses(
        (status = 200, description = "Order lines", body = [OrderLineResponse]),
        (status = 401, description = "Admin role required"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn get_order_lines(
    service: web::Data<OrderService>,
    _admin: AdminUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let lines = web::block(move || service.order_lines(order_id)).await??;

    let body: Vec<OrderLineResponse> = lines.into_iter().map(OrderLineResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /orders
///
/// Returns one page of aggregated orders, newest order id first.
#[utoipa::path(
    get,
    path = "/orders",
    params(ListOrdersParams),
    responses(
        (status = 200, description = "Page of orders", body = [OrderResponse]),
        (status = 400, description = "page_id < 1 or page_size outside 5..=10"),
        (status = 401, description = "Admin role required"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    service: web::Data<OrderService>,
    _admin: AdminUser,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let page = PageRequest::new(params.page_id, params.page_size)?;

    let orders = web::block(move || service.list_orders(page)).await??;

    Ok(HttpResponse::Ok().json(order_list(orders)))
}

/// GET /orders/all
#[utoipa::path(
    get,
    path = "/orders/all",
    responses(
        (status = 200, description = "All orders", body = [OrderResponse]),
        (status = 401, description = "Admin role required"),
    ),
    tag = "orders"
)]
pub async fn list_all_orders(
    service: web::Data<OrderService>,
    _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let orders = web::block(move || service.list_all_orders()).await??;

    Ok(HttpResponse::Ok().json(order_list(orders)))
}

/// DELETE /orders/{order_id}
#[utoipa::path(
    delete,
    path = "/orders/{order_id}",
    params(
        ("order_id" = i64, Path, description = "Order id"),
    ),
    responses(
        (status = 204, description = "Order deleted"),
        (status = 401, description = "Admin role required"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn delete_order(
    service: web::Data<OrderService>,
    _admin: AdminUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    web::block(move || service.delete_order(order_id)).await??;

    Ok(HttpResponse::NoContent().finish())
}
