use std::collections::BTreeMap;

use dsc_engine::{
    constants::{MAX_PRICE_AGE_SECONDS, PRECISION},
    engine::DscEngine,
    oracle::{OracleGateway, PriceData},
    token::TokenBook,
};
use proptest::prelude::*;
use solana_program::pubkey::Pubkey;

const NOW: i64 = 1_700_000_000;
const USERS: usize = 3;

#[derive(Debug, Clone)]
enum Action {
    Deposit { user: usize, amount: u128 },
    Mint { user: usize, amount: u128 },
    Redeem { user: usize, amount: u128 },
    Burn { user: usize, amount: u128 },
    Liquidate { liquidator: usize, debtor: usize, amount: u128 },
    SetPrice { usd: i64 },
}

fn action(with_prices: bool) -> BoxedStrategy<Action> {
    let user = 0..USERS;
    let core = prop_oneof![
        (user.clone(), 1..4_000u128).prop_map(|(user, milli)| Action::Deposit {
            user,
            amount: milli * PRECISION / 1_000,
        }),
        (user.clone(), 1..3_000u128).prop_map(|(user, units)| Action::Mint {
            user,
            amount: units * PRECISION,
        }),
        (user.clone(), 1..4_000u128).prop_map(|(user, milli)| Action::Redeem {
            user,
            amount: milli * PRECISION / 1_000,
        }),
        (user.clone(), 1..3_000u128).prop_map(|(user, units)| Action::Burn {
            user,
            amount: units * PRECISION,
        }),
        (user.clone(), user.clone(), 1..1_000u128).prop_map(|(liquidator, debtor, units)| {
            Action::Liquidate {
                liquidator,
                debtor,
                amount: units * PRECISION,
            }
        }),
    ];

    if with_prices {
        prop_oneof![
            4 => core,
            1 => (100..4_000i64).prop_map(|usd| Action::SetPrice { usd }),
        ]
        .boxed()
    } else {
        core.boxed()
    }
}

struct World {
    engine: DscEngine,
    book: TokenBook,
    feeds: BTreeMap<Pubkey, PriceData>,
    weth: Pubkey,
    weth_feed: Pubkey,
    stable: Pubkey,
    custody: Pubkey,
    users: Vec<Pubkey>,
}

impl World {
    fn new() -> Self {
        let (weth, weth_feed, stable, custody) = (
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            Pubkey::new_unique(),
        );
        let mut book = TokenBook::new(custody, stable);
        let users: Vec<Pubkey> = (0..USERS).map(|_| Pubkey::new_unique()).collect();
        for user in &users {
            book.fund(&weth, user, 10 * PRECISION);
        }

        let mut feeds = BTreeMap::new();
        feeds.insert(weth_feed, PriceData::usd_e8(2_000 * 100_000_000, NOW));

        Self {
            engine: DscEngine::new(&[weth], &[weth_feed], stable, custody).unwrap(),
            book,
            feeds,
            weth,
            weth_feed,
            stable,
            custody,
            users,
        }
    }

    /// Apply one action; returns whether it committed
    fn apply(&mut self, action: &Action) -> bool {
        if let Action::SetPrice { usd } = action {
            self.feeds
                .insert(self.weth_feed, PriceData::usd_e8(usd * 100_000_000, NOW));
            return true;
        }

        let oracle = OracleGateway::new(&self.feeds, NOW, MAX_PRICE_AGE_SECONDS);
        let result = match *action {
            Action::Deposit { user, amount } => {
                self.engine
                    .deposit_collateral(&mut self.book, &self.users[user], &self.weth, amount)
            }
            Action::Mint { user, amount } => {
                self.engine
                    .mint_dsc(&oracle, &mut self.book, &self.users[user], amount)
            }
            Action::Redeem { user, amount } => {
                self.engine
                    .redeem_collateral(&oracle, &mut self.book, &self.users[user], &self.weth, amount)
            }
            Action::Burn { user, amount } => self.engine.burn_dsc(&mut self.book, &self.users[user], amount),
            Action::Liquidate {
                liquidator,
                debtor,
                amount,
            } => self.engine.liquidate(
                &oracle,
                &mut self.book,
                &self.users[liquidator],
                &self.weth,
                &self.users[debtor],
                amount,
            ),
            Action::SetPrice { .. } => Ok(()),
        };
        result.is_ok()
    }

    fn health(&self, user: &Pubkey) -> u128 {
        let oracle = OracleGateway::new(&self.feeds, NOW, MAX_PRICE_AGE_SECONDS);
        self.engine.health_factor(&oracle, user).unwrap()
    }

    /// Custody and supply always mirror the ledger
    fn assert_books_match(&self) {
        assert_eq!(
            self.book.balance_of(&self.weth, &self.custody),
            self.engine.total_collateral(&self.weth)
        );
        assert_eq!(self.book.total_supply(&self.stable), self.engine.total_debt());
        assert_eq!(self.book.balance_of(&self.stable, &self.custody), 0);
        assert!(!self.engine.is_locked());
    }
}

proptest! {
    #[test]
    fn prop_constant_price_keeps_everyone_solvent(
        actions in prop::collection::vec(action(false), 1..40)
    ) {
        let mut world = World::new();

        for action in &actions {
            world.apply(action);
            world.assert_books_match();

            for user in world.users.clone() {
                if world.engine.debt_of(&user) > 0 {
                    prop_assert!(world.health(&user) >= world.engine.min_health_factor());
                }
            }

            let oracle = OracleGateway::new(&world.feeds, NOW, MAX_PRICE_AGE_SECONDS);
            let custody_value = world
                .engine
                .usd_value(&oracle, &world.weth, world.engine.total_collateral(&world.weth))
                .unwrap();
            prop_assert!(world.book.total_supply(&world.stable) <= custody_value);
        }
    }

    #[test]
    fn prop_failed_actions_leave_no_trace(
        actions in prop::collection::vec(action(true), 1..40)
    ) {
        let mut world = World::new();

        for action in &actions {
            let ledger = world.engine.ledger().clone();
            let events = world.engine.events().len();
            let wallets: Vec<(u128, u128)> = world
                .users
                .iter()
                .map(|u| (world.book.balance_of(&world.weth, u), world.book.balance_of(&world.stable, u)))
                .collect();

            let committed = world.apply(action);
            world.assert_books_match();

            if !committed {
                prop_assert_eq!(world.engine.ledger(), &ledger);
                prop_assert_eq!(world.engine.events().len(), events);
                for (user, before) in world.users.iter().zip(&wallets) {
                    let after = (
                        world.book.balance_of(&world.weth, user),
                        world.book.balance_of(&world.stable, user),
                    );
                    prop_assert_eq!(&after, before);
                }
                continue;
            }

            // whoever acted and holds debt ended the call healthy
            let actor = match *action {
                Action::Mint { user, .. } | Action::Redeem { user, .. } => Some(user),
                Action::Liquidate { liquidator, .. } => Some(liquidator),
                _ => None,
            };
            if let Some(actor) = actor {
                let actor = world.users[actor];
                if world.engine.debt_of(&actor) > 0 {
                    prop_assert!(world.health(&actor) >= world.engine.min_health_factor());
                }
            }
        }
    }

    #[test]
    fn prop_round_trip_is_exact_at_whole_dollar_prices(
        usd in 1..1_000_000i64,
        amount in 0..(1u128 << 96),
    ) {
        let world = World::new();
        let mut feeds = BTreeMap::new();
        feeds.insert(world.weth_feed, PriceData::usd_e8(usd * 100_000_000, NOW));
        let oracle = OracleGateway::new(&feeds, NOW, MAX_PRICE_AGE_SECONDS);

        let value = world.engine.usd_value(&oracle, &world.weth, amount).unwrap();
        prop_assert_eq!(world.engine.token_amount_from_usd(&oracle, &world.weth, value).unwrap(), amount);
    }

    #[test]
    fn prop_round_trip_never_gains(
        price in 1..1_000_000_000_000_000i64,
        amount in 0..(1u128 << 96),
    ) {
        let world = World::new();
        let mut feeds = BTreeMap::new();
        feeds.insert(world.weth_feed, PriceData::usd_e8(price, NOW));
        let oracle = OracleGateway::new(&feeds, NOW, MAX_PRICE_AGE_SECONDS);

        let value = world.engine.usd_value(&oracle, &world.weth, amount).unwrap();
        prop_assert!(world.engine.token_amount_from_usd(&oracle, &world.weth, value).unwrap() <= amount);
    }
}
