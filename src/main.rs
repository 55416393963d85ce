use anyhow::{anyhow, bail, Context};
use chrono::{Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use movie_booking::{
    auth::{admit, NavLinks, Navigator, Route},
    checkout::{CheckoutFlow, Money, PromoOutcome, Transition},
    config::Config,
    controllers::{bookings::MyBookings, movies, profile, MovieQuery},
    models::{PaymentMethod, SeatCategory, SeatId},
    search_client::{SearchClient, SearchOutcome},
    services::CardDetails,
    AppState,
};

#[derive(Debug, Parser)]
#[command(name = "movie-booking", version, about = "Book movie tickets from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List movies, optionally searching and filtering
    Movies {
        #[arg(long)]
        query: Option<String>,
        #[arg(long, default_value = "all")]
        genre: movies::GenreFilter,
        #[arg(long, default_value = "rating")]
        sort: movies::SortBy,
    },
    /// Show movie details
    Movie { id: String },
    /// Book seats for a showtime
    Book {
        movie_id: String,
        /// YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,
        /// e.g. "6:30 PM"
        #[arg(long)]
        time: String,
        /// Comma separated, e.g. D4,D5
        #[arg(long, value_delimiter = ',', value_parser = parse_seat, required = true)]
        seats: Vec<SeatId>,
        #[arg(long, default_value = "standard")]
        category: SeatCategory,
        #[arg(long)]
        promo: Option<String>,
        #[arg(long)]
        method: PaymentMethod,
        #[arg(long, default_value = "")]
        card_holder: String,
        #[arg(long, default_value = "")]
        card_number: String,
        /// MM/YY
        #[arg(long, default_value = "")]
        expiry: String,
        #[arg(long, default_value = "")]
        cvv: String,
    },
    /// List my bookings
    Bookings,
    /// Request a refund for a booking
    Refund { booking_id: String },
    /// Show profile and booking stats
    Profile,
}

fn parse_seat(s: &str) -> Result<SeatId, String> {
    SeatId::parse(s).ok_or_else(|| format!("invalid seat '{}', expected e.g. A12", s))
}

struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn navigate(&self, route: Route) {
        if route == Route::Login {
            eprintln!("Please login to continue: set API_TOKEN or API_EMAIL/API_PASSWORD");
        } else {
            eprintln!("-> {}", route);
        }
    }
}

/// Закрытый экран без сессии: уводим на логин и завершаемся с ошибкой.
fn require(state: &AppState, route: Route) -> anyhow::Result<()> {
    if !admit(&state.session, route, &ConsoleNavigator) {
        bail!("Please login to continue");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    let json_layer = config
        .is_production()
        .then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr));
    let plain_layer = (!config.is_production()).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.app.rust_log))
        .with(json_layer)
        .with(plain_layer)
        .init();

    info!("Starting movie-booking against {}", config.api.base_url);
    let state = AppState::new(config).await.context("Failed to initialize client")?;

    let nav = NavLinks::for_session(&state.session);
    info!("Navigation: {:?}", nav.0.iter().map(|l| l.label()).collect::<Vec<_>>());

    match cli.command {
        Command::Movies { query, genre, sort } => list_movies(&state, query, genre, sort).await,
        Command::Movie { id } => show_movie(&state, &id).await,
        Command::Book {
            movie_id,
            date,
            time,
            seats,
            category,
            promo,
            method,
            card_holder,
            card_number,
            expiry,
            cvv,
        } => {
            let card = CardDetails { holder_name: card_holder, card_number, expiry, cvv };
            book(&state, &movie_id, date, &time, &seats, category, promo.as_deref(), method, card).await
        }
        Command::Bookings => list_bookings(&state).await,
        Command::Refund { booking_id } => refund(&state, &booking_id).await,
        Command::Profile => show_profile(&state).await,
    }
}

async fn list_movies(
    state: &AppState,
    query: Option<String>,
    genre: movies::GenreFilter,
    sort: movies::SortBy,
) -> anyhow::Result<()> {
    require(state, Route::Movies)?;
    let search = SearchClient::new(state.api.clone(), &state.config.search);
    let outcome = match query.as_deref() {
        Some(q) => search.search(q).await,
        None => search.load_all().await,
    }
    .map_err(|e| anyhow!(e.user_message("Failed to fetch movies")))?;

    let catalog = match outcome {
        SearchOutcome::Results(movies) => movies,
        SearchOutcome::Skipped => {
            println!("Type at least {} characters to search", state.config.search.min_query_len);
            return Ok(());
        }
        SearchOutcome::Superseded => return Ok(()),
    };

    let shown = movies::filter_and_sort(&catalog, &MovieQuery { genre, title: None, sort });
    if shown.is_empty() {
        println!("No movies found");
    }
    for movie in &shown {
        println!("{:<26} {:>4}  {:<30} {}", movie.id, movie.rating_label(), movie.title, movie.genres_label());
    }
    Ok(())
}

async fn show_movie(state: &AppState, id: &str) -> anyhow::Result<()> {
    require(state, Route::Booking(id.to_string()))?;
    let movie = movies::fetch_movie(&state.api, id).await.map_err(|m| anyhow!(m))?;
    println!("{}", movie.title);
    println!("Rating:   {}", movie.rating_label());
    println!("Genre:    {}", movie.genres_label());
    if let Some(duration) = &movie.duration {
        println!("Duration: {}", duration);
    }
    if let Some(director) = &movie.director {
        println!("Director: {}", director);
    }
    if let Some(price) = &movie.price {
        println!("Price:    {} standard / {} premium", Money(price.standard), Money(price.premium));
    }
    if let Some(description) = &movie.description {
        println!("\n{}", description);
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn book(
    state: &AppState,
    movie_id: &str,
    date: NaiveDate,
    time: &str,
    seats: &[SeatId],
    category: SeatCategory,
    promo: Option<&str>,
    method: PaymentMethod,
    card: CardDetails,
) -> anyhow::Result<()> {
    require(state, Route::Booking(movie_id.to_string()))?;

    let movie = movies::fetch_movie(&state.api, movie_id).await.map_err(|m| anyhow!(m))?;
    let mut flow = CheckoutFlow::new(&movie, &state.config.booking, Local::now().date_naive())?;

    let stage = flow.date_time_mut().context("checkout is not at date selection")?;
    if !stage.select_date(date) {
        bail!("{} is not open for booking", date);
    }
    if !stage.select_time_str(time)? {
        bail!("There is no {} show", time);
    }
    if let Transition::Blocked(reason) = flow.continue_to_seats() {
        bail!("Cannot continue to seat selection: {:?}", reason);
    }

    let stage = flow.seats_mut().context("checkout is not at seat selection")?;
    stage.set_category(category);
    for &seat in seats {
        if !stage.toggle_seat(seat) {
            bail!("Seat {} is not available for {} tickets", seat, category);
        }
    }
    if let Some(code) = promo {
        stage.set_promo_code(code);
        match flow.apply_promo(&state.api).await {
            Some(PromoOutcome::Applied(discount)) => println!("Promo code applied: {}% off", discount),
            Some(PromoOutcome::Rejected(e)) => println!("{}", e.user_message()),
            Some(PromoOutcome::Stale) | None => {}
        }
    }

    if let Some(summary) = flow.summary() {
        println!("{}\n", summary);
    }
    if let Transition::Blocked(reason) = flow.continue_to_payment() {
        bail!("Cannot continue to payment: {:?}", reason);
    }

    let payment = flow.payment_mut().context("checkout is not at payment")?;
    payment.select_method(method);
    *payment.card_mut() = card;
    if !payment.can_pay() {
        bail!("Please fill in card number, expiry date and CVV");
    }

    let confirmation = flow
        .submit(&state.api, |phase| println!("{}", phase))
        .await
        .map_err(|e| anyhow!(e.user_message()))?;

    println!("Booking confirmed!");
    if let Some(reference) = confirmation.reference().or(confirmation.booking_id()) {
        println!("Reference: {}", reference);
    }
    Ok(())
}

async fn list_bookings(state: &AppState) -> anyhow::Result<()> {
    require(state, Route::MyBookings)?;
    let mut view = MyBookings::new(state.api.clone(), &state.config.booking);
    view.fetch().await.map_err(|m| anyhow!(m))?;

    let now = Utc::now();
    if view.bookings().is_empty() {
        println!("You have no bookings yet");
    }
    for booking in view.bookings() {
        let refund = if view.is_refundable(booking, now) { "  [refundable]" } else { "" };
        println!(
            "{}  {}  {}  seats {}  {}  {}{}",
            booking.id,
            booking.movie.title(),
            booking.showtime.with_timezone(&Local).format("%a, %b %-d %-I:%M %p"),
            booking.seats_label(),
            Money(booking.total_amount),
            booking.status,
            refund
        );
    }
    Ok(())
}

async fn refund(state: &AppState, booking_id: &str) -> anyhow::Result<()> {
    require(state, Route::MyBookings)?;
    let mut view = MyBookings::new(state.api.clone(), &state.config.booking);
    view.fetch().await.map_err(|m| anyhow!(m))?;
    let message = view
        .refund(booking_id, Utc::now())
        .await
        .map_err(|e| anyhow!(e.user_message()))?;
    println!("{}", message);
    Ok(())
}

async fn show_profile(state: &AppState) -> anyhow::Result<()> {
    require(state, Route::Profile)?;
    let p = profile::Profile::load(&state.api)
        .await
        .map_err(|e| anyhow!(e.user_message(profile::FETCH_FAILED)))?;

    println!("[{}] {}", p.initial(), p.user.name);
    if let Some(email) = &p.user.email {
        println!("Email:          {}", email);
    }
    println!("Account type:   {}", p.account_type());
    if let Some(since) = p.member_since() {
        println!("Member since:   {}", since);
    }
    println!("Total bookings: {}", p.stats.total_bookings);
    println!("This month:     {}", p.stats.monthly_bookings);
    println!("Total spent:    {}", p.total_spent());
    Ok(())
}
