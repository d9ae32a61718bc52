pub mod run;

use secrecy::SecretString;

#[derive(Debug)]
pub enum Action {
    Login {
        username: String,
        password: SecretString,
    },
    Logout,
    Whoami,
    Introspect {
        token: Option<SecretString>,
    },
    Products {
        id: Option<u64>,
        search: Option<String>,
    },
    Orders {
        id: Option<u64>,
        customer: Option<String>,
    },
    Session,
}
