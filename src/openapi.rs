use utoipa::OpenApi;

use crate::handlers::orders;

#[derive(OpenApi)]
#[openapi(
    paths(
        orders::create_order,
        orders::update_order_status,
        orders::update_order_delivery,
        orders::get_order,
        orders::get_order_lines,
        orders::list_orders,
        orders::list_all_orders,
        orders::delete_order,
    ),
    components(schemas(
        orders::CreateOrderRequest,
        orders::UpdateOrderStatusRequest,
        orders::UpdateOrderDeliveryRequest,
        orders::OrderResponse,
        orders::ServiceResponse,
        orders::OrderLineResponse,
    )),
    tags((name = "orders", description = "Order creation, aggregation and fulfilment"))
)]
pub struct ApiDoc;
