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
    dto::{
        auth::{
            LoginRequest, LoginResponse, RegisterRequest, RegisteredResponse, ResendCodeRequest,
            TokenLoginRequest, VerifyRequest,
        },
        cart::{AddToCartRequest, CartLineDto, CartList, CartTotals, LineTotal, UpdateCartItemRequest},
        products::{BrowseList, CreateProductRequest, ProductList, ProductWithMarket, UpdateProductRequest},
        profile::{ProfileDto, UpdateProfileRequest},
    },
    middleware::auth::UserKind,
    models::{CartItem, Product},
    response::{ApiResponse, Meta},
    routes::{auth, cart, health, params, products, profile, purchases},
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
        auth::register,
        auth::verify,
        auth::resend,
        auth::login,
        auth::token_login,
        auth::logout,
        products::browse_products,
        products::list_my_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        cart::cart_list,
        cart::cart_total,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        purchases::purchase,
        profile::get_profile,
        profile::update_profile
    ),
    components(
        schemas(
            UserKind,
            Product,
            CartItem,
            RegisterRequest,
            RegisteredResponse,
            VerifyRequest,
            ResendCodeRequest,
            LoginRequest,
            TokenLoginRequest,
            LoginResponse,
            AddToCartRequest,
            UpdateCartItemRequest,
            CartLineDto,
            CartList,
            LineTotal,
            CartTotals,
            CreateProductRequest,
            UpdateProductRequest,
            ProductWithMarket,
            BrowseList,
            ProductList,
            ProfileDto,
            UpdateProfileRequest,
            params::Pagination,
            params::BrowseQuery,
            health::HealthData,
            Meta,
            ApiResponse<Product>,
            ApiResponse<CartItem>,
            ApiResponse<CartList>,
            ApiResponse<CartTotals>,
            ApiResponse<BrowseList>,
            ApiResponse<ProductList>,
            ApiResponse<LoginResponse>,
            ApiResponse<ProfileDto>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration, verification and login"),
        (name = "Products", description = "Market product CRUD and consumer browsing"),
        (name = "Cart", description = "Cart lines and totals"),
        (name = "Purchase", description = "Atomic checkout"),
        (name = "Profile", description = "Account profile"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
