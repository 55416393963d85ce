use std::fmt;

use super::session::Session;

/// Экраны приложения.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    ForgotPassword,
    Movies,
    Booking(String),
    Bookings,
    MyBookings,
    Profile,
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Register => "/register".to_string(),
            Route::ForgotPassword => "/forgot-password".to_string(),
            Route::Movies => "/".to_string(),
            Route::Booking(movie_id) => format!("/booking/{}", movie_id),
            Route::Bookings => "/bookings".to_string(),
            Route::MyBookings => "/my-bookings".to_string(),
            Route::Profile => "/profile".to_string(),
        }
    }

    pub fn requires_auth(&self) -> bool {
        !matches!(self, Route::Login | Route::Register | Route::ForgotPassword)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Возможность "перейти на экран X". Реализуется внешним слоем (CLI, UI).
pub trait Navigator {
    fn navigate(&self, route: Route);
}

/// Закрытые экраны без сессии уводят на логин.
pub fn guard(session: &Session, route: Route) -> Route {
    if route.requires_auth() && !session.is_authenticated() {
        Route::Login
    } else {
        route
    }
}

/// Пускает на экран или отправляет навигатор туда, куда велит `guard`.
pub fn admit(session: &Session, route: Route, navigator: &dyn Navigator) -> bool {
    let target = guard(session, route.clone());
    if target == route {
        return true;
    }
    navigator.navigate(target);
    false
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavLink {
    Home,
    MyBookings,
    Profile,
    /// Имя пользователя в меню
    Account(String),
    SignOut,
    SignIn,
    SignUp,
}

impl NavLink {
    pub fn label(&self) -> &str {
        match self {
            NavLink::Home => "Movie Tickets",
            NavLink::MyBookings => "My Bookings",
            NavLink::Profile => "Profile",
            NavLink::Account(name) => name,
            NavLink::SignOut => "Sign out",
            NavLink::SignIn => "Sign in",
            NavLink::SignUp => "Sign up",
        }
    }

    pub fn route(&self) -> Option<Route> {
        match self {
            NavLink::Home => Some(Route::Movies),
            NavLink::MyBookings => Some(Route::MyBookings),
            NavLink::Profile | NavLink::Account(_) => Some(Route::Profile),
            NavLink::SignIn => Some(Route::Login),
            NavLink::SignUp => Some(Route::Register),
            NavLink::SignOut => None,
        }
    }
}

/// Ссылки навигационной панели для текущей сессии.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLinks(pub Vec<NavLink>);

impl NavLinks {
    pub fn for_session(session: &Session) -> Self {
        let links = match session.current_user() {
            Some(user) => vec![
                NavLink::Home,
                NavLink::MyBookings,
                NavLink::Profile,
                NavLink::Account(user.name),
                NavLink::SignOut,
            ],
            None => vec![NavLink::Home, NavLink::SignIn, NavLink::SignUp],
        };
        NavLinks(links)
    }
}
