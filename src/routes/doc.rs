use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    domain::{
        cart::{CartLineItem, LineSummary},
        catalog::CategoryNode,
        order_status::OrderStatus,
        scheduling::SlotAvailability,
    },
    dto::{
        appointments::{AppointmentCreated, AvailabilityResponse, CreateAppointmentRequest},
        cart::{CartItemRequest, CartView, RemoveFromCartRequest},
        categories::{CategoryTree, CreateCategoryRequest, UpdateCategoryRequest},
        checkout::{CheckoutItem, CreateSessionRequest, SessionCreated, WebhookAck},
        orders::{OrderDetail, OrderList, StatusUpdated, UpdateStatusRequest},
        products::{CreateProductRequest, ProductList, ProductUnit, UpdateProductRequest},
        users::{UpdateRoleRequest, UserList},
    },
    error::ErrorBody,
    models::{Appointment, Cart, Category, Product, Role, User},
    response::{Empty, PageMeta},
    routes::{
        admin, appointments, auth, cart, categories, checkout, health, orders, params, products,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::register,
        products::list_products,
        products::create_product,
        products::get_product,
        products::update_product,
        products::delete_product,
        categories::list_categories,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        cart::get_cart,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        cart::list_user_orders,
        appointments::availability,
        appointments::create_appointment,
        orders::list_all_orders,
        orders::get_order,
        orders::update_order_status,
        checkout::create_session,
        checkout::stripe_webhook,
        admin::list_users,
        admin::update_role,
        admin::delete_user
    ),
    components(
        schemas(
            User,
            Role,
            Product,
            ProductUnit,
            Category,
            CategoryNode,
            Cart,
            CartLineItem,
            LineSummary,
            Appointment,
            OrderStatus,
            SlotAvailability,
            CartItemRequest,
            RemoveFromCartRequest,
            CartView,
            CreateAppointmentRequest,
            AvailabilityResponse,
            AppointmentCreated,
            UpdateStatusRequest,
            StatusUpdated,
            OrderDetail,
            OrderList,
            CheckoutItem,
            CreateSessionRequest,
            SessionCreated,
            WebhookAck,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            CategoryTree,
            UpdateRoleRequest,
            UserList,
            params::Pagination,
            params::SortOrder,
            params::ProductSortBy,
            ErrorBody,
            Empty,
            PageMeta
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Products", description = "Product catalog"),
        (name = "Categories", description = "Category tree"),
        (name = "Cart", description = "Open cart and order history of a user"),
        (name = "Appointments", description = "Pickup and delivery slots"),
        (name = "Orders", description = "Order lifecycle"),
        (name = "Checkout", description = "Hosted payment and gateway webhooks"),
        (name = "Admin", description = "User administration"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
