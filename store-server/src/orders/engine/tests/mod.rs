use super::*;
use crate::accounts::AccountService;
use crate::catalog::CatalogService;
use shared::BookInfo;

mod test_core;

const BUYER: &str = "u1";
const BUYER_PW: &str = "buyer-pw";
const SELLER: &str = "seller";
const STORE: &str = "s1";

struct TestCtx {
    accounts: Arc<AccountService>,
    catalog: Arc<CatalogService>,
    engine: Arc<OrderEngine>,
}

fn test_ctx() -> TestCtx {
    // Long TTL: timers never fire unless a test asks for it
    test_ctx_with_ttl(Duration::from_secs(600))
}

fn test_ctx_with_ttl(order_ttl: Duration) -> TestCtx {
    let accounts = Arc::new(AccountService::open_in_memory().unwrap());
    let catalog = Arc::new(CatalogService::open_in_memory(accounts.clone()).unwrap());
    let storage = OrderStorage::open_in_memory().unwrap();
    let engine = OrderEngine::new(
        storage,
        accounts.clone(),
        catalog.clone(),
        order_ttl,
        CancellationToken::new(),
    );
    TestCtx {
        accounts,
        catalog,
        engine,
    }
}

fn book(id: &str, price: i64) -> BookInfo {
    BookInfo {
        id: id.to_string(),
        title: format!("Book {}", id),
        author: "Author".to_string(),
        publisher: "Publisher".to_string(),
        price: Decimal::from(price),
        tags: vec![],
    }
}

impl TestCtx {
    /// Buyer + seller + one store with two listings:
    /// b1 at 10 (stock 5), b2 at 20 (stock 3)
    fn seed(&self) {
        self.accounts.register(BUYER, BUYER_PW).unwrap();
        self.accounts.register(SELLER, "seller-pw").unwrap();
        self.catalog.create_store(SELLER, STORE).unwrap();
        self.catalog.add_book(SELLER, STORE, book("b1", 10), 5).unwrap();
        self.catalog.add_book(SELLER, STORE, book("b2", 20), 3).unwrap();
    }

    fn fund_buyer(&self, amount: i64) {
        self.accounts.credit(BUYER, Decimal::from(amount)).unwrap();
    }

    fn order(&self, items: &[(&str, u32)]) -> String {
        let items: Vec<OrderDraftItem> = items
            .iter()
            .map(|(book_id, count)| OrderDraftItem::new(*book_id, *count))
            .collect();
        self.engine.new_order(BUYER, STORE, &items).unwrap()
    }

    fn stock(&self, book_id: &str) -> u32 {
        self.catalog.stock_level(STORE, book_id).unwrap()
    }

    fn balance(&self, user_id: &str) -> Decimal {
        self.accounts.balance(user_id).unwrap()
    }

    fn status(&self, order_id: &str) -> OrderStatus {
        self.engine
            .storage()
            .get_history(order_id)
            .unwrap()
            .unwrap()
            .status
    }
}
