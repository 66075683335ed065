//! Operation catalog.
//!
//! The exchange exposes one private endpoint that switches on a `method`
//! field, plus a handful of public GET paths. Each supported call is a
//! variant of [`Operation`] with a declarative [`OperationSpec`] in
//! [`CATALOG`]. Adding or reshaping an operation is a table edit.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Where an operation is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    /// Signed POST to the private trade API.
    Private,
    /// Unsigned GET to the public API; the wire method is the path.
    Public,
}

/// Value type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "values", rename_all = "snake_case")]
pub enum FieldKind {
    /// Non-empty free text.
    Text,
    /// Lowercase alphanumeric currency code (`btc`, `idr`).
    Currency,
    /// `base_quote` pair.
    Pair,
    /// `buy` or `sell`.
    Side,
    /// Exact decimal, given as a JSON number or numeric string.
    Decimal,
    /// Unsigned integer, given as a JSON number or numeric string.
    Integer,
    /// `YYYY-MM-DD`.
    Date,
    /// One of a fixed set of strings.
    Choice(&'static [&'static str]),
}

/// Domain bound checked after type parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Bound {
    Any,
    /// Strictly greater than zero.
    Positive,
    /// Inclusive integer range.
    Between { min: u64, max: u64 },
}

/// Name a field takes in the request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wire {
    /// Same as the caller-facing name.
    Same,
    /// Fixed wire name.
    Named(&'static str),
    /// Named after the pair's quote currency (`idr` for `btc_idr`).
    QuoteCurrency,
    /// Named after the pair's base currency (`btc` for `btc_idr`).
    BaseCurrency,
    /// Not a body field; substituted into the public API path.
    Path,
}

/// Schema entry for one parameter.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub bound: Bound,
    #[serde(skip)]
    pub wire: Wire,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<&'static str>,
    pub description: &'static str,
}

const fn field(name: &'static str, kind: FieldKind, description: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        bound: Bound::Any,
        wire: Wire::Same,
        default: None,
        description,
    }
}

impl FieldSpec {
    const fn bounded(self, bound: Bound) -> Self {
        Self { bound, ..self }
    }

    const fn on_wire(self, wire: Wire) -> Self {
        Self { wire, ..self }
    }

    const fn or_default(self, default: &'static str) -> Self {
        Self {
            default: Some(default),
            ..self
        }
    }
}

/// Cross-field constraints, checked after every field has parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossRule {
    /// Exactly one of `notional` / `amount`: buys are sized by quote-currency
    /// notional, sells by base-currency amount.
    TradeAmount,
    /// `start` must not be after `end` when both are given.
    DateOrder {
        start: &'static str,
        end: &'static str,
    },
}

/// Declarative description of one operation.
#[derive(Debug, Serialize)]
pub struct OperationSpec {
    #[serde(skip)]
    pub operation: Operation,
    pub name: &'static str,
    #[serde(skip)]
    pub wire_method: &'static str,
    pub endpoint: Endpoint,
    pub required: &'static [FieldSpec],
    pub optional: &'static [FieldSpec],
    #[serde(skip)]
    pub rules: &'static [CrossRule],
    /// Safe to repeat; only these are retried automatically.
    pub idempotent: bool,
    pub description: &'static str,
}

impl OperationSpec {
    /// Looks up a field by caller-facing name.
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.required
            .iter()
            .chain(self.optional.iter())
            .find(|f| f.name == name)
    }
}

/// Every supported operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    AccountInfo,
    TransactionHistory,
    Ticker,
    TickerAll,
    Trades,
    Pairs,
    Summaries,
    PriceIncrements,
    ServerTime,
    OpenOrders,
    PlaceOrder,
    GetOrder,
    GetOrderByClientId,
    CancelOrder,
    CancelByClientId,
    OrderHistory,
    TradeHistory,
    WithdrawFee,
    Withdraw,
    ListDownline,
    CheckDownline,
    CreateVoucher,
}

impl Operation {
    pub const ALL: [Operation; 22] = [
        Self::AccountInfo,
        Self::TransactionHistory,
        Self::Ticker,
        Self::TickerAll,
        Self::Trades,
        Self::Pairs,
        Self::Summaries,
        Self::PriceIncrements,
        Self::ServerTime,
        Self::OpenOrders,
        Self::PlaceOrder,
        Self::GetOrder,
        Self::GetOrderByClientId,
        Self::CancelOrder,
        Self::CancelByClientId,
        Self::OrderHistory,
        Self::TradeHistory,
        Self::WithdrawFee,
        Self::Withdraw,
        Self::ListDownline,
        Self::CheckDownline,
        Self::CreateVoucher,
    ];

    pub fn spec(self) -> &'static OperationSpec {
        &CATALOG[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn endpoint(self) -> Endpoint {
        self.spec().endpoint
    }

    pub fn is_idempotent(self) -> bool {
        self.spec().idempotent
    }

    pub fn from_name(name: &str) -> Option<Self> {
        CATALOG.iter().find(|s| s.name == name).map(|s| s.operation)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| ValidationError::UnknownOperation(s.to_string()))
    }
}

// ============================================================================
// Shared fields
// ============================================================================

const PAIR: FieldSpec = field("pair", FieldKind::Pair, "Trading pair, e.g. btc_idr.");
const PATH_PAIR: FieldSpec = PAIR.on_wire(Wire::Path).or_default("btc_idr");
const SIDE: FieldSpec = field("side", FieldKind::Side, "Order side: buy or sell.").on_wire(Wire::Named("type"));
const ORDER_ID: FieldSpec = field("order_id", FieldKind::Integer, "Exchange order id.").bounded(Bound::Positive);
const CLIENT_ORDER_ID: FieldSpec = field(
    "client_order_id",
    FieldKind::Text,
    "Caller-generated order id.",
);
const CURRENCY: FieldSpec = field("currency", FieldKind::Currency, "Currency code, e.g. btc.");
const NETWORK: FieldSpec = field("network", FieldKind::Text, "Network code, e.g. erc20.");

const HISTORY_FIELDS: [FieldSpec; 5] = [
    PAIR,
    field("count", FieldKind::Integer, "Maximum number of records.")
        .bounded(Bound::Between { min: 1, max: 1000 })
        .or_default("100"),
    field("from_id", FieldKind::Integer, "First record id.").on_wire(Wire::Named("from")),
    field("end_id", FieldKind::Integer, "Last record id.").on_wire(Wire::Named("end")),
    field("order", FieldKind::Choice(&["asc", "desc"]), "Sort order.").or_default("desc"),
];

const fn read(
    operation: Operation,
    name: &'static str,
    wire_method: &'static str,
    endpoint: Endpoint,
    description: &'static str,
) -> OperationSpec {
    OperationSpec {
        operation,
        name,
        wire_method,
        endpoint,
        required: &[],
        optional: &[],
        rules: &[],
        idempotent: true,
        description,
    }
}

/// Indexed by `Operation as usize`.
pub static CATALOG: [OperationSpec; 22] = [
    read(
        Operation::AccountInfo,
        "account/info",
        "getInfo",
        Endpoint::Private,
        "Account balances, balances on hold, deposit addresses and server time.",
    ),
    OperationSpec {
        optional: &[
            field("start", FieldKind::Date, "First day (YYYY-MM-DD)."),
            field("end", FieldKind::Date, "Last day (YYYY-MM-DD)."),
        ],
        rules: &[CrossRule::DateOrder {
            start: "start",
            end: "end",
        }],
        ..read(
            Operation::TransactionHistory,
            "account/transactions",
            "transHistory",
            Endpoint::Private,
            "Deposit and withdrawal history between two dates; the exchange defaults to the last 7 days.",
        )
    },
    OperationSpec {
        optional: &[PATH_PAIR],
        ..read(
            Operation::Ticker,
            "ticker",
            "ticker",
            Endpoint::Public,
            "Price snapshot for one pair.",
        )
    },
    read(
        Operation::TickerAll,
        "ticker/all",
        "ticker_all",
        Endpoint::Public,
        "Price snapshot for every pair.",
    ),
    OperationSpec {
        optional: &[PATH_PAIR],
        ..read(
            Operation::Trades,
            "market/trades",
            "trades",
            Endpoint::Public,
            "Recent public trades for one pair.",
        )
    },
    read(
        Operation::Pairs,
        "market/pairs",
        "pairs",
        Endpoint::Public,
        "Tradable pairs and their trading rules.",
    ),
    read(
        Operation::Summaries,
        "market/summaries",
        "summaries",
        Endpoint::Public,
        "24h summaries for every pair.",
    ),
    read(
        Operation::PriceIncrements,
        "market/price_increments",
        "price_increments",
        Endpoint::Public,
        "Price tick size per pair.",
    ),
    read(
        Operation::ServerTime,
        "market/server_time",
        "server_time",
        Endpoint::Public,
        "Exchange server time in milliseconds.",
    ),
    OperationSpec {
        optional: &[PAIR],
        ..read(
            Operation::OpenOrders,
            "order/open",
            "openOrders",
            Endpoint::Private,
            "Active orders, optionally for one pair.",
        )
    },
    OperationSpec {
        required: &[
            PAIR,
            SIDE,
            field("price", FieldKind::Decimal, "Limit price per unit of base currency.")
                .bounded(Bound::Positive),
        ],
        optional: &[
            field(
                "notional",
                FieldKind::Decimal,
                "Quote-currency amount to spend (buy orders only).",
            )
            .bounded(Bound::Positive)
            .on_wire(Wire::QuoteCurrency),
            field(
                "amount",
                FieldKind::Decimal,
                "Base-currency quantity to sell (sell orders only).",
            )
            .bounded(Bound::Positive)
            .on_wire(Wire::BaseCurrency),
            field("order_type", FieldKind::Choice(&["limit", "market"]), "Order type."),
            CLIENT_ORDER_ID,
            field(
                "time_in_force",
                FieldKind::Choice(&["GTC", "MOC"]),
                "GTC (good till cancelled) or MOC (maker or cancel).",
            ),
        ],
        rules: &[CrossRule::TradeAmount],
        idempotent: false,
        ..read(
            Operation::PlaceOrder,
            "order/place",
            "trade",
            Endpoint::Private,
            "Submit a buy or sell order.",
        )
    },
    OperationSpec {
        required: &[PAIR, ORDER_ID],
        ..read(
            Operation::GetOrder,
            "order/get",
            "getOrder",
            Endpoint::Private,
            "Order detail by exchange order id.",
        )
    },
    OperationSpec {
        required: &[CLIENT_ORDER_ID],
        ..read(
            Operation::GetOrderByClientId,
            "order/get_by_client_id",
            "getOrderByClientOrderId",
            Endpoint::Private,
            "Order detail by client order id.",
        )
    },
    OperationSpec {
        required: &[PAIR, ORDER_ID, SIDE],
        idempotent: false,
        ..read(
            Operation::CancelOrder,
            "order/cancel",
            "cancelOrder",
            Endpoint::Private,
            "Cancel an open order by exchange order id.",
        )
    },
    OperationSpec {
        required: &[CLIENT_ORDER_ID],
        idempotent: false,
        ..read(
            Operation::CancelByClientId,
            "order/cancel_by_client_id",
            "cancelByClientOrderId",
            Endpoint::Private,
            "Cancel an open order by client order id.",
        )
    },
    OperationSpec {
        optional: &HISTORY_FIELDS,
        ..read(
            Operation::OrderHistory,
            "order/history",
            "orderHistory",
            Endpoint::Private,
            "Historical orders.",
        )
    },
    OperationSpec {
        optional: &HISTORY_FIELDS,
        ..read(
            Operation::TradeHistory,
            "trade/history",
            "tradeHistory",
            Endpoint::Private,
            "Historical fills.",
        )
    },
    OperationSpec {
        required: &[CURRENCY],
        optional: &[NETWORK],
        ..read(
            Operation::WithdrawFee,
            "withdraw/fee",
            "withdrawFee",
            Endpoint::Private,
            "Withdrawal fee estimate for a currency.",
        )
    },
    OperationSpec {
        required: &[
            CURRENCY,
            field("address", FieldKind::Text, "Destination address.")
                .on_wire(Wire::Named("withdraw_address")),
            field("amount", FieldKind::Decimal, "Amount of coin to withdraw.")
                .bounded(Bound::Positive)
                .on_wire(Wire::Named("withdraw_amount")),
        ],
        optional: &[
            NETWORK,
            field("memo", FieldKind::Text, "Destination memo or tag.")
                .on_wire(Wire::Named("withdraw_memo")),
            field("request_id", FieldKind::Text, "Caller reference for the withdrawal."),
        ],
        idempotent: false,
        ..read(
            Operation::Withdraw,
            "withdraw/request",
            "withdrawCoin",
            Endpoint::Private,
            "Withdraw coin to an external address.",
        )
    },
    read(
        Operation::ListDownline,
        "referral/downlines",
        "listDownline",
        Endpoint::Private,
        "Referral downlines (partner accounts only).",
    ),
    OperationSpec {
        required: &[field("username", FieldKind::Text, "Username to check.")],
        ..read(
            Operation::CheckDownline,
            "referral/check",
            "checkDownline",
            Endpoint::Private,
            "Whether a username is one of your downlines.",
        )
    },
    OperationSpec {
        required: &[field("amount", FieldKind::Decimal, "Voucher value in IDR.").bounded(Bound::Positive)],
        optional: &[field("description", FieldKind::Text, "Voucher note.")],
        idempotent: false,
        ..read(
            Operation::CreateVoucher,
            "voucher/create",
            "createVoucher",
            Endpoint::Private,
            "Create a voucher (partner accounts only).",
        )
    },
];
