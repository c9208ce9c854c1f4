//! Plain-text rendering of storefront data.

#![allow(clippy::print_stdout)]

use hearth_core::CommentTree;
use hearth_storefront::cart::CartStore;
use hearth_storefront::models::{
    BlogPost, CommunityEvent, DashboardStats, Order, PlacedOrder, Principal, Product, ProductPage,
    Review,
};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

pub fn principal(principal: &Principal) {
    let handle = if principal.username.is_empty() {
        String::new()
    } else {
        format!(" (@{})", principal.username)
    };
    println!("{}{handle} <{}>", principal.name, principal.email);
    println!("  id:   {}", principal.id);
    println!("  role: {}", principal.role);
    if let Some(avatar) = &principal.avatar {
        println!("  avatar: {avatar}");
    }
}

pub fn users(users: &[Principal]) {
    for user in users {
        println!("{:<26} {:<6} {} <{}>", user.id, user.role, user.name, user.email);
    }
}

pub fn product_page(page: &ProductPage) {
    if page.products.is_empty() {
        println!("No products found.");
        return;
    }
    for product in &page.products {
        let stock = match product.stock {
            Some(0) => " [sold out]",
            _ => "",
        };
        println!("{:<26} {:>10}  {}{stock}", product.id, product.price.to_string(), product.title);
    }
    println!("page {} of {}", page.page, page.pages);
}

pub fn product(product: &Product, reviews: &[Review]) {
    println!("{} - {}", product.title, product.price);
    if let Some(category) = &product.category {
        println!("category: {category}");
    }
    if let Some(stock) = product.stock {
        println!("in stock: {stock}");
    }
    if !product.description.is_empty() {
        println!();
        println!("{}", product.description);
    }
    println!();
    println!("{} review(s)", reviews.len());
    for review in reviews {
        println!(
            "  {}/5 by {} on {}: {}",
            review.rating,
            review.user.name,
            review.created_at.format(DATE_FORMAT),
            review.comment
        );
    }
}

pub fn cart(cart: &CartStore) {
    if cart.is_empty() {
        println!("Your cart is empty.");
        return;
    }
    for line in cart.lines() {
        println!(
            "{:<26} {:>3} x {:>10} = {:>10}  {}",
            line.product_id,
            line.quantity,
            line.price.to_string(),
            line.subtotal().to_string(),
            line.title
        );
    }
    println!("{} item(s), total {}", cart.item_count(), cart.total());
}

pub fn placed_order(placed: &PlacedOrder) {
    println!("Order {} placed, total {}", placed.order.id, placed.order.total_price);
    if let Some(secret) = &placed.client_secret {
        println!("Complete payment with client secret: {secret}");
    }
}

pub fn orders(orders: &[Order]) {
    if orders.is_empty() {
        println!("No orders.");
        return;
    }
    for order in orders {
        let paid = if order.is_paid { "paid" } else { "unpaid" };
        let customer = order
            .user
            .as_ref()
            .map(|user| format!("  customer {}", user.id()))
            .unwrap_or_default();
        println!(
            "{:<26} {} {:>10} {:<10} {paid}{customer}",
            order.id,
            order.created_at.format(DATE_FORMAT),
            order.total_price.to_string(),
            order.status,
        );
    }
}

pub fn posts(posts: &[BlogPost]) {
    for post in posts {
        println!(
            "{:<26} {:>3} like(s)  {} by {}",
            post.id,
            post.like_count(),
            post.title,
            post.author.name
        );
    }
}

pub fn post(post: &BlogPost, comments: &CommentTree) {
    println!("{}", post.title);
    println!(
        "by {} on {}, {} like(s)",
        post.author.name,
        post.created_at.format(DATETIME_FORMAT),
        post.like_count()
    );
    if !post.tags.is_empty() {
        println!("tags: {}", post.tags.join(", "));
    }
    println!();
    println!("{}", post.content);
    println!();
    println!("{} comment(s)", comments.len());
    for node in comments.flatten() {
        let indent = "  ".repeat(node.depth + 1);
        let replies = match node.reply_count() {
            0 => String::new(),
            1 => " (1 reply)".to_string(),
            n => format!(" ({n} replies)"),
        };
        println!(
            "{indent}{} [{}]{replies}: {}",
            node.comment.author.name, node.comment.id, node.comment.content
        );
    }
}

pub fn events(events: &[CommunityEvent]) {
    for event in events {
        let capacity = event
            .max_attendees
            .map(|max| format!("{}/{max}", event.attendee_count()))
            .unwrap_or_else(|| event.attendee_count().to_string());
        println!(
            "{:<26} {}  {:<7} {} @ {}",
            event.id,
            event.date.format(DATETIME_FORMAT),
            capacity,
            event.title,
            event.location
        );
    }
}

pub fn event(event: &CommunityEvent) {
    let full = if event.is_full() { " (full)" } else { "" };
    println!(
        "{}: {} attendee(s){full}",
        event.title,
        event.attendee_count()
    );
}

pub fn dashboard(stats: &DashboardStats) {
    println!("users:    {}", stats.total_users);
    println!("orders:   {}", stats.total_orders);
    println!("products: {}", stats.total_products);
    println!("revenue:  {}", stats.total_revenue);
    if !stats.recent_orders.is_empty() {
        println!();
        println!("recent orders:");
        orders(&stats.recent_orders);
    }
}

pub fn done(message: &str) {
    println!("{message}");
}
