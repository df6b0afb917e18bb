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
    auth::{PhoneFlowState, phone::PhoneFlowView},
    config::ProjectIdentity,
    dto::{
        auth::{
            CredentialsRequest, LoginResponse, PhoneFlowRequest, PhoneSignInResponse,
            ResendPhoneCodeRequest, SendPhoneCodeRequest, SessionInfo, SignUpResponse,
            VerifyPhoneCodeRequest,
        },
        bookings::{
            BookingDashboard, BookingDetails, BookingForm, CustomerList, CustomerSummary,
            TicketField, TicketPatch,
        },
    },
    models::{Booking, ItineraryDay, Package, Role, Taxi, Ticket, User},
    response::{ApiResponse, Meta},
    routes::{admin, auth, bookings, health, params},
    services::package_service::SeedReport,
    status::{BookingStatus, StatusCounts},
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
        health::client_config,
        auth::sign_up,
        auth::login,
        auth::logout,
        auth::session,
        auth::verify_email,
        auth::send_phone_code,
        auth::resend_phone_code,
        auth::change_phone_number,
        auth::verify_phone_code,
        auth::phone_flow,
        bookings::list_my_bookings,
        bookings::get_my_booking,
        admin::list_bookings,
        admin::create_booking,
        admin::get_booking,
        admin::update_booking,
        admin::delete_booking,
        admin::booking_form,
        admin::add_ticket,
        admin::update_ticket,
        admin::remove_ticket,
        admin::list_customers,
        admin::list_packages,
        admin::seed_packages
    ),
    components(
        schemas(
            User,
            Role,
            Booking,
            BookingStatus,
            StatusCounts,
            Ticket,
            Taxi,
            Package,
            ItineraryDay,
            ProjectIdentity,
            CredentialsRequest,
            SignUpResponse,
            LoginResponse,
            SessionInfo,
            SendPhoneCodeRequest,
            ResendPhoneCodeRequest,
            PhoneFlowRequest,
            VerifyPhoneCodeRequest,
            PhoneFlowView,
            PhoneFlowState,
            PhoneSignInResponse,
            BookingForm,
            TicketField,
            TicketPatch,
            BookingDashboard,
            BookingDetails,
            CustomerSummary,
            CustomerList,
            SeedReport,
            params::BookingListQuery,
            params::ConfirmQuery,
            Meta,
            ApiResponse<Booking>,
            ApiResponse<BookingDashboard>,
            ApiResponse<BookingDetails>,
            ApiResponse<LoginResponse>,
            ApiResponse<PhoneFlowView>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check and client configuration"),
        (name = "Auth", description = "Email and phone sign-in"),
        (name = "Bookings", description = "Customer booking views"),
        (name = "Admin", description = "Booking management, customers and packages"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
