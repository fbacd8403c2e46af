pub mod attendance;
pub mod session;
pub mod students;

#[cfg(test)]
pub(crate) mod testing {
    use actix_web::{
        App, Error,
        body::MessageBody,
        dev::{ServiceFactory, ServiceRequest, ServiceResponse},
        http::header::AUTHORIZATION,
        test::TestRequest,
        web::Data,
    };
    use std::net::SocketAddr;

    use crate::{
        auth::jwt::generate_access_token, config::Config, db::init_memory_db,
        oracle::http::HttpOracle, routes, session::state::SessionHandle, store::kv::SqliteStore,
    };

    #[derive(Clone)]
    pub struct TestState {
        pub config: Config,
        pub store: SqliteStore,
        pub session: SessionHandle,
    }

    impl TestState {
        pub async fn new() -> Self {
            let pool = init_memory_db().await.unwrap();
            Self {
                config: Config::for_tests(),
                store: SqliteStore::new(pool),
                session: SessionHandle::default(),
            }
        }

        /// Call on a clone; the app takes ownership of the state.
        pub fn app(
            self,
        ) -> App<
            impl ServiceFactory<
                ServiceRequest,
                Config = (),
                Response = ServiceResponse<impl MessageBody>,
                Error = Error,
                InitError = (),
            >,
        > {
            let Self {
                config,
                store,
                session,
            } = self;
            App::new()
                .app_data(Data::new(store))
                .app_data(Data::new(HttpOracle::new(config.oracle_url.clone(), None)))
                .app_data(Data::new(session))
                .app_data(Data::new(config.clone()))
                .configure(move |cfg| routes::configure(cfg, config))
        }

        pub fn access_token(&self) -> String {
            generate_access_token("op-test", "op@test.dev", &self.config.jwt_secret, 900).unwrap()
        }

        /// A request from a fixed peer, which the rate limiter keys on.
        pub fn request(&self, request: TestRequest) -> TestRequest {
            let peer: SocketAddr = "127.0.0.1:40000".parse().unwrap();
            request.peer_addr(peer)
        }

        pub fn authed(&self, request: TestRequest) -> TestRequest {
            self.request(request)
                .insert_header((AUTHORIZATION, format!("Bearer {}", self.access_token())))
        }
    }
}
