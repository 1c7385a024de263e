use ethers::prelude::*;

// Curve stETH/ETH pool, coin 0 = ETH, coin 1 = stETH.
abigen!(
    ICurvePool,
    r#"[
        function get_dy(int128 i, int128 j, uint256 dx) external view returns (uint256)
    ]"#
);
