use ethers::prelude::*;

// Anchor bETH vault; `get_rate` is the stETH backing per bETH, 18 decimals.
abigen!(
    IAnchorVault,
    r#"[
        function get_rate() external view returns (uint256)
    ]"#
);
