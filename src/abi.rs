use ethers::prelude::abigen;

// Bindings for the deployed FanPredix contract. The interface description is
// vendored inline from the deployment; the contract itself lives off-repo.
// The ABI is given in JSON form because the human-readable parser drops
// `internalType` on outputs, which would turn struct returns into bare tuples.
abigen!(
    FanPredix,
    r#"[
        {
            "type": "function", "name": "addTeam", "stateMutability": "nonpayable",
            "inputs": [
                {"internalType": "string", "name": "_name", "type": "string"},
                {"internalType": "address", "name": "_teamManager", "type": "address"},
                {"internalType": "address", "name": "_fanToken", "type": "address"}
            ],
            "outputs": []
        },
        {
            "type": "function", "name": "getAllTeams", "stateMutability": "view",
            "inputs": [],
            "outputs": [
                {
                    "internalType": "struct FanPredix.Team[]", "name": "", "type": "tuple[]",
                    "components": [
                        {"internalType": "uint256", "name": "id", "type": "uint256"},
                        {"internalType": "string", "name": "name", "type": "string"},
                        {"internalType": "address", "name": "teamManager", "type": "address"},
                        {"internalType": "address", "name": "fanToken", "type": "address"}
                    ]
                }
            ]
        },
        {
            "type": "function", "name": "createMarket", "stateMutability": "nonpayable",
            "inputs": [
                {"internalType": "string", "name": "_category", "type": "string"},
                {"internalType": "string", "name": "_question", "type": "string"},
                {"internalType": "string", "name": "_description", "type": "string"},
                {"internalType": "string[]", "name": "_options", "type": "string[]"},
                {"internalType": "uint256", "name": "_startTime", "type": "uint256"},
                {"internalType": "uint256", "name": "_endTime", "type": "uint256"}
            ],
            "outputs": [
                {"internalType": "uint256", "name": "", "type": "uint256"}
            ]
        },
        {
            "type": "function", "name": "getMarketsByTeam", "stateMutability": "view",
            "inputs": [
                {"internalType": "uint256", "name": "_teamId", "type": "uint256"}
            ],
            "outputs": [
                {"internalType": "uint256[]", "name": "", "type": "uint256[]"}
            ]
        },
        {
            "type": "function", "name": "getMarket", "stateMutability": "view",
            "inputs": [
                {"internalType": "uint256", "name": "_marketId", "type": "uint256"}
            ],
            "outputs": [
                {
                    "internalType": "struct FanPredix.Market", "name": "", "type": "tuple",
                    "components": [
                        {"internalType": "uint256", "name": "id", "type": "uint256"},
                        {"internalType": "uint256", "name": "teamId", "type": "uint256"},
                        {"internalType": "address", "name": "teamManager", "type": "address"},
                        {"internalType": "address", "name": "fanToken", "type": "address"},
                        {"internalType": "string", "name": "category", "type": "string"},
                        {"internalType": "string", "name": "question", "type": "string"},
                        {"internalType": "string", "name": "description", "type": "string"},
                        {"internalType": "string[]", "name": "options", "type": "string[]"},
                        {"internalType": "uint256", "name": "startTime", "type": "uint256"},
                        {"internalType": "uint256", "name": "endTime", "type": "uint256"},
                        {"internalType": "uint8", "name": "status", "type": "uint8"},
                        {"internalType": "uint256", "name": "resolvedOutcomeIndex", "type": "uint256"}
                    ]
                }
            ]
        },
        {
            "type": "function", "name": "placeOrder", "stateMutability": "nonpayable",
            "inputs": [
                {"internalType": "uint256", "name": "_marketId", "type": "uint256"},
                {"internalType": "uint256", "name": "_outcomeIndex", "type": "uint256"},
                {"internalType": "uint8", "name": "_orderType", "type": "uint8"},
                {"internalType": "uint256", "name": "_amount", "type": "uint256"},
                {"internalType": "uint256", "name": "_odds", "type": "uint256"}
            ],
            "outputs": [
                {"internalType": "uint256", "name": "", "type": "uint256"}
            ]
        },
        {
            "type": "function", "name": "cancelOrder", "stateMutability": "nonpayable",
            "inputs": [
                {"internalType": "uint256", "name": "_orderId", "type": "uint256"}
            ],
            "outputs": []
        },
        {
            "type": "function", "name": "getUserBets", "stateMutability": "view",
            "inputs": [
                {"internalType": "uint256", "name": "_marketId", "type": "uint256"},
                {"internalType": "address", "name": "_user", "type": "address"}
            ],
            "outputs": [
                {"internalType": "uint256[]", "name": "", "type": "uint256[]"}
            ]
        },
        {
            "type": "function", "name": "getBet", "stateMutability": "view",
            "inputs": [
                {"internalType": "uint256", "name": "_betId", "type": "uint256"}
            ],
            "outputs": [
                {
                    "internalType": "struct FanPredix.Bet", "name": "", "type": "tuple",
                    "components": [
                        {"internalType": "uint256", "name": "id", "type": "uint256"},
                        {"internalType": "uint256", "name": "marketId", "type": "uint256"},
                        {"internalType": "address", "name": "user", "type": "address"},
                        {"internalType": "uint256", "name": "outcomeIndex", "type": "uint256"},
                        {"internalType": "uint256", "name": "amount", "type": "uint256"},
                        {"internalType": "uint256", "name": "odds", "type": "uint256"},
                        {"internalType": "uint8", "name": "orderType", "type": "uint8"}
                    ]
                }
            ]
        }
    ]"#
);

/// Market lifecycle states as stored on-chain (`status` ordinal).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MarketStatus {
    Open,
    Closed,
    Resolved,
}

impl MarketStatus {
    pub fn from_ordinal(value: u8) -> Option<Self> {
        match value {
            0 => Some(MarketStatus::Open),
            1 => Some(MarketStatus::Closed),
            2 => Some(MarketStatus::Resolved),
            _ => None,
        }
    }

    pub fn ordinal(self) -> u8 {
        match self {
            MarketStatus::Open => 0,
            MarketStatus::Closed => 1,
            MarketStatus::Resolved => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MarketStatus::Open => "Open",
            MarketStatus::Closed => "Closed",
            MarketStatus::Resolved => "Resolved",
        }
    }
}

/// Order side in the exchange model (`orderType` ordinal).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Side {
    Back,
    Lay,
}

impl Side {
    pub fn from_ordinal(value: u8) -> Option<Self> {
        match value {
            0 => Some(Side::Back),
            1 => Some(Side::Lay),
            _ => None,
        }
    }

    pub fn ordinal(self) -> u8 {
        match self {
            Side::Back => 0,
            Side::Lay => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Side::Back => "Back",
            Side::Lay => "Lay",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Side::Back => Side::Lay,
            Side::Lay => Side::Back,
        }
    }
}
